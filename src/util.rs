/// Decimal conversion helpers.
///
/// This module provides safe functions for converting between the
/// interpreter's decimal numbers and machine integers or floats. Every
/// conversion that could silently lose information returns a `Result` instead.
pub mod num;
