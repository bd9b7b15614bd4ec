//! Front-end endpoint handlers, one module per page/feature.

pub mod batch_job;
pub mod diff;
pub mod health;
pub mod image_info;
pub mod marked_images;
pub mod pages;
