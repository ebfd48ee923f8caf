// src/models/contact.rs

use serde::Deserialize;
use validator::Validate;

/// DTO for the contact form.
#[derive(Debug, Deserialize, Validate)]
pub struct ContactRequest {
    #[validate(length(min = 1, max = 200, message = "Name is required."))]
    pub name: String,
    #[validate(email(message = "Please enter a valid email address."))]
    pub email: String,
    #[validate(length(min = 1, max = 5000, message = "Message is required."))]
    pub message: String,
}

/// DTO for newsletter signup.
#[derive(Debug, Deserialize, Validate)]
pub struct NewsletterRequest {
    #[validate(email(message = "Please enter a valid email address."))]
    pub email: String,
}
