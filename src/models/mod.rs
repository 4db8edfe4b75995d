pub mod case_url;
pub mod service_desk;
pub mod ticket_request;
