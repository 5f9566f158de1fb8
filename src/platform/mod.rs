// External collaborator boundaries

pub mod pose;
