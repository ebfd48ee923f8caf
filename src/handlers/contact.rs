// src/handlers/contact.rs
//
// Marketing endpoints: contact form and newsletter signup. Thin CRUD
// wrappers; the interesting part is only the field-level validation and
// the reactivation path for lapsed subscriptions.

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde_json::json;
use sqlx::PgPool;
use validator::Validate;

use crate::{
    error::{AppError, is_undefined_table},
    models::contact::{ContactRequest, NewsletterRequest},
    utils::html::clean_html,
};

/// Stores a contact-form submission.
pub async fn submit_contact(
    State(pool): State<PgPool>,
    Json(payload): Json<ContactRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let message = clean_html(&payload.message);

    sqlx::query(
        r#"
        INSERT INTO contact_submissions (name, email, message)
        VALUES ($1, $2, $3)
        "#,
    )
    .bind(&payload.name)
    .bind(&payload.email)
    .bind(&message)
    .execute(&pool)
    .await
    .map_err(|e| {
        if is_undefined_table(&e) {
            tracing::warn!("Contact submissions relation is missing: {}", e);
        } else {
            tracing::error!("Failed to store contact submission: {:?}", e);
        }
        AppError::from(e)
    })?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": "Thank you for your message! We'll get back to you soon.",
        })),
    ))
}

/// Subscribes an email to the newsletter, reactivating a lapsed
/// subscription instead of failing on it.
pub async fn subscribe_newsletter(
    State(pool): State<PgPool>,
    Json(payload): Json<NewsletterRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let existing: Option<(String,)> =
        sqlx::query_as("SELECT status FROM newsletter_subscriptions WHERE email = $1")
            .bind(&payload.email)
            .fetch_optional(&pool)
            .await?;

    if let Some((status,)) = existing {
        if status == "unsubscribed" {
            sqlx::query("UPDATE newsletter_subscriptions SET status = 'active' WHERE email = $1")
                .bind(&payload.email)
                .execute(&pool)
                .await?;

            return Ok((
                StatusCode::OK,
                Json(json!({
                    "success": true,
                    "message": "Welcome back! Your subscription has been reactivated.",
                })),
            ));
        }

        return Err(AppError::BadRequest(
            "This email is already subscribed to our newsletter".to_string(),
        ));
    }

    sqlx::query("INSERT INTO newsletter_subscriptions (email) VALUES ($1)")
        .bind(&payload.email)
        .execute(&pool)
        .await
        .map_err(|e| {
            if is_undefined_table(&e) {
                tracing::warn!("Newsletter relation is missing: {}", e);
            } else {
                tracing::error!("Failed to store subscription: {:?}", e);
            }
            AppError::from(e)
        })?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": "Thank you for subscribing to our newsletter!",
        })),
    ))
}
