pub mod lit_pass;
pub mod pass;
pub mod shadow_pass;
