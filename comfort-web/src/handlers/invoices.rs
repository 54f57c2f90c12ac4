use askama::Template;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    Form, Json,
};
use comfort_core::error::AppError;
use serde::Deserialize;

use crate::models::{AuthUser, Customer, InvoiceSummary, InvoiceView, NewInvoice, SessionUser};
use crate::AppState;

#[derive(Template)]
#[template(path = "invoices.html")]
pub struct InvoicesTemplate {
    pub user: SessionUser,
    pub invoices: Vec<InvoiceSummary>,
}

#[derive(Template)]
#[template(path = "invoice_new.html")]
pub struct InvoiceNewTemplate {
    pub user: SessionUser,
    pub customers: Vec<Customer>,
}

#[derive(Template)]
#[template(path = "invoice_document.html")]
pub struct InvoiceDocumentTemplate {
    pub invoice: InvoiceView,
}

#[derive(Debug, Deserialize)]
pub struct CancelInvoiceForm {
    pub reason: String,
}

pub async fn invoices_page(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> Result<impl IntoResponse, AppError> {
    let invoices = state.db.list_invoices().await?;

    Ok(InvoicesTemplate {
        user: auth_user.0,
        invoices,
    })
}

pub async fn new_invoice_page(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> Result<impl IntoResponse, AppError> {
    let customers = state.db.list_customers().await?;

    Ok(InvoiceNewTemplate {
        user: auth_user.0,
        customers,
    })
}

/// Create an invoice from the submitted customer, discount and line items.
/// Totals are computed server-side; the created header is returned.
pub async fn create_invoice_handler(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Json(input): Json<NewInvoice>,
) -> Result<impl IntoResponse, AppError> {
    let header = state
        .db
        .create_invoice(auth_user.0.user_id, &input)
        .await?;

    Ok((StatusCode::CREATED, Json(header)))
}

pub async fn cancel_invoice_handler(
    State(state): State<AppState>,
    _auth_user: AuthUser,
    Path(invoice_no): Path<i64>,
    Form(form): Form<CancelInvoiceForm>,
) -> Result<Response, AppError> {
    state.db.cancel_invoice(invoice_no, &form.reason).await?;

    Ok(Redirect::to("/invoices").into_response())
}

/// Printable rendition of one invoice; consumes the read model only.
pub async fn invoice_document_page(
    State(state): State<AppState>,
    _auth_user: AuthUser,
    Path(invoice_no): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let invoice = state.db.get_invoice(invoice_no).await?;

    Ok(InvoiceDocumentTemplate { invoice })
}
