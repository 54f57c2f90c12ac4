use askama::Template;
use axum::{
    extract::{Path, State},
    response::{IntoResponse, Redirect, Response},
    Form,
};
use comfort_core::error::AppError;
use uuid::Uuid;
use validator::Validate;

use crate::models::{AuthUser, Customer, CustomerInput, SessionUser};
use crate::AppState;

#[derive(Template)]
#[template(path = "customers.html")]
pub struct CustomersTemplate {
    pub user: SessionUser,
    pub customers: Vec<Customer>,
}

#[derive(Template)]
#[template(path = "customer_edit.html")]
pub struct CustomerEditTemplate {
    pub user: SessionUser,
    pub customer: Customer,
}

pub async fn customers_page(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> Result<impl IntoResponse, AppError> {
    let customers = state.db.list_customers().await?;

    Ok(CustomersTemplate {
        user: auth_user.0,
        customers,
    })
}

pub async fn create_customer_handler(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Form(input): Form<CustomerInput>,
) -> Result<Response, AppError> {
    input.validate()?;

    state
        .db
        .create_customer(auth_user.0.user_id, &input)
        .await?;

    Ok(Redirect::to("/customers").into_response())
}

pub async fn edit_customer_page(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let customer = state
        .db
        .get_customer(id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Customer not found")))?;

    Ok(CustomerEditTemplate {
        user: auth_user.0,
        customer,
    })
}

pub async fn update_customer_handler(
    State(state): State<AppState>,
    _auth_user: AuthUser,
    Path(id): Path<Uuid>,
    Form(input): Form<CustomerInput>,
) -> Result<Response, AppError> {
    input.validate()?;

    state
        .db
        .update_customer(id, &input)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Customer not found")))?;

    Ok(Redirect::to("/customers").into_response())
}

pub async fn delete_customer_handler(
    State(state): State<AppState>,
    _auth_user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Response, AppError> {
    state.db.delete_customer(id).await?;

    Ok(Redirect::to("/customers").into_response())
}
