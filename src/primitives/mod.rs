//! Low-level primitives for the on-disk array format.

/// NumPy `.npy` headers and little-endian payload encoding.
///
/// Arrays are written with their payload aligned so a memory map of the file
/// can be viewed as a typed slice in place.
pub mod npy;
