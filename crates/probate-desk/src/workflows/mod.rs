pub mod documents;
pub mod estate;
pub mod fees;
pub mod matter;
pub mod qualification;
