mod decide;
mod generate;
mod retrieve;

pub use decide::DecideNode;
pub use generate::GenerateNode;
pub use retrieve::RetrieveNode;

pub use decide::DECIDE_NODE_ID;
pub use generate::GENERATE_NODE_ID;
pub use retrieve::RETRIEVE_NODE_ID;
