pub mod admission;

pub use admission::{client_identity, sweep_loop, Admission, AdmissionController};
