pub mod mailersend;
