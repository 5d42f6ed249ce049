mod category;
mod invoice;
pub mod money;
mod supplier;
mod user;

pub use category::Category;
pub use invoice::{Invoice, NewInvoice, PaymentStatus, PaymentUpdate};
pub use supplier::Supplier;
pub use user::User;
