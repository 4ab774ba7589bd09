//! User profile rules: how patches merge into a stored user.

pub mod entity;
