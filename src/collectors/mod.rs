pub mod df;
pub mod jps;
pub mod jstat;
pub mod table;
