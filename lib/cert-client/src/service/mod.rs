pub mod application_form;
