pub mod descriptor;
pub mod notification;
pub mod operation;
pub mod pipeline;
pub mod request;
