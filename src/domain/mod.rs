pub mod month;
pub mod policy;
pub mod proration;

pub use month::MonthLabel;
pub use policy::CompanyPolicy;
