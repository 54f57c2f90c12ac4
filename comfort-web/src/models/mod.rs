//! Domain models for comfort-web.

mod customer;
mod invoice;
mod user;

pub use customer::{Customer, CustomerInput};
pub use invoice::{
    InvoiceHeader, InvoiceLine, InvoiceStatus, InvoiceSummary, InvoiceTotals, InvoiceView,
    NewInvoice, NewInvoiceLine,
};
pub use user::{AuthUser, Role, SessionUser, User, SESSION_USER_KEY};
