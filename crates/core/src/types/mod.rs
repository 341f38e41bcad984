//! Domain types for Enquiry Desk.

pub mod email;
pub mod enquiry;
pub mod id;
pub mod listing;
pub mod status;
pub mod user;

pub use email::{Email, EmailError};
pub use enquiry::{
    AssignedUser, Assignee, Enquiry, EnquiryDraft, EnquiryStats, EnquiryUpdate,
    FullEnquiryUpdate, LimitedEnquiryUpdate, NewEnquiry, StatusCount,
};
pub use id::*;
pub use listing::{
    DEFAULT_LIMIT, DEFAULT_PAGE, EnquiryFilter, EnquiryListing, MAX_LIMIT, PAGE_SIZES,
    Pagination, UserFilter,
};
pub use status::*;
pub use user::{AuthResponse, NewUser, User, UserList, UserUpdate};
