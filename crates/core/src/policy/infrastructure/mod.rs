pub mod permissive_policy;
