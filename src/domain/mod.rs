// Domain layer - observation frames, patient records and dashboard display state
pub mod dashboard;
pub mod facility;
pub mod observation;
pub mod patient;
pub mod vitals;
