pub mod book;
pub mod orders;
pub mod run;
