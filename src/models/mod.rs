pub mod jobmodel;
pub mod messagemodel;
pub mod servicemodel;
pub mod usermodel;
