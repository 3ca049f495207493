pub mod waitlist_signup;

pub use waitlist_signup::{waitlist_signup, waitlist_signup_preflight};
