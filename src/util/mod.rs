
/// Generic JSON load/save helpers with transparent gzip support
pub mod json_io;
/// Non-negative least squares via the Lawson-Hanson active set method
pub mod nnls;
/// Shared progress bar styling
pub mod progress_bar;
/// Dense two-phase simplex for small linear programs
pub mod simplex;
