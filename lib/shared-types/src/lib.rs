mod certificate_id;

pub use certificate_id::CertificateId;
