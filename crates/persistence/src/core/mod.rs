//! Core storage traits and abstractions.
//!
//! - [`Backend`] - Database driver lifecycle
//! - [`PersonStorage`] - Person rows and documents (Patient, Practitioner)
//! - [`MedicationRequestStorage`] - Medication requests

mod backend;
mod storage;

pub use backend::{Backend, BackendKind};
pub use storage::{MedicationRequestStorage, PersonStorage};
