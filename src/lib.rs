//! # osgb
//!
//! Conversion between latitude/longitude and the Ordnance Survey National Grid
//! of Great Britain, on either WGS84 (GPS) or OSGB36 (the datum of the OS maps).
//!
//! ```no_run
//! use std::error::Error;
//!
//! use osgb::{ConverterBuilder, Datum, GeoPoint, GridPoint};
//!
//! fn main() -> Result<(), Box<dyn Error>> {
//!     // Loads the correction grid, e.g. an OSTN02 resource
//!     let converter = ConverterBuilder::new().grid_path("ostn02.bin")?.build();
//!
//!     // WGS84 latitude and longitude to the grid
//!     let origin = GeoPoint::new(52.657977, 1.716038);
//!     let result = converter.ll_to_grid(&origin, Datum::Wgs84, None);
//!     println!("Grid: {result:?}");
//!
//!     // and back
//!     let p = converter.grid_to_ll(&result, Datum::Wgs84);
//!     println!("Back: {p:?}");
//!
//!     // OSGB36 does not need the grid
//!     let q = converter.grid_to_ll(&GridPoint::new(651409.903, 313177.270), Datum::Osgb36);
//!     // Prints OSGB36: GeoPoint { latitude: 52.657570301933156, longitude: 1.7179215806450958 }
//!     println!("OSGB36: {q:?}");
//!
//!     Ok(())
//! }
//! ```
//!
//! Features:
//!
//! - Transverse Mercator projection by the OS formulae, accurate to about 1 mm
//! - WGS84 via the OSTN correction grid, with bilinear interpolation
//!   and the iterative inverse for the grid-to-latitude/longitude direction
//! - Falls back to the seven-parameter Helmert transformation
//!   (a few metres) outside the grid
//! - The process-wide converter and string-keyed functions, [`ll_to_grid`] and [`grid_to_ll`]
//!
//! This package does not contain the correction grid,
//! load it by [`ConverterBuilder::grid_path`], or name it by the `OSGB_GRID_PATH`
//! environment variable for [`Converter::global`].
//! Without the grid, every WGS84 conversion goes through the Helmert transformation.
//!
//! # Global Converter
//!
//! ```
//! # use std::error::Error;
//! use osgb::{grid_to_ll, ll_to_grid};
//!
//! # fn main() -> Result<(), Box<dyn Error>> {
//! // The true origin
//! assert_eq!(ll_to_grid(49.0, -2.0, "OSGB36", None)?, (400000.0, -100000.0));
//!
//! // Precision, decimal places of the result
//! assert_eq!(ll_to_grid(52.0, -2.0, "OSGB36", Some(4))?, (400000.0, 233553.7313));
//!
//! let (latitude, longitude) = grid_to_ll(400000.0, -100000.0, "OSGB36")?;
//! assert!((latitude - 49.0).abs() < 1e-9);
//! assert_eq!(longitude, -2.0);
//!
//! // Unsupported datum
//! assert!(ll_to_grid(49.0, -2.0, "EDM50", None).is_err());
//! # Ok(())}
//! ```
//!
//! # Logging
//!
//! It emits events by [`tracing`](https://crates.io/crates/tracing),
//! a `debug` event on the Helmert fallback and on loading a grid,
//! and a `warn` event when an iteration does not converge.
//!
//! # Serialization and Deserialization
//!
//! It supports (de)serialization of [`GeoPoint`], [`GridPoint`], [`Shift`] and [`Datum`]
//! by [`serde` crate](https://crates.io/crates/serde)
//! only if the feature `serde` is enabled.
#[doc(inline)]
pub use builder::ConverterBuilder;
#[doc(inline)]
pub use convert::{grid_to_ll, ll_to_grid, ConvertError, Converter};
#[doc(inline)]
pub use datum::Datum;
#[doc(inline)]
pub use grid::CorrectionGrid;
#[doc(inline)]
pub use point::{GeoPoint, GridPoint, Shift};

pub mod builder;
pub mod convert;
pub mod datum;
pub mod grid;
pub mod helmert;
mod internal;
pub mod point;
pub mod projection;
