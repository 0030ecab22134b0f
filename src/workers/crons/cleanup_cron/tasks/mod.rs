pub mod purge_relationship_history;
