pub mod application;
pub mod certificate;
