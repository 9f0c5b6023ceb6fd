mod lookup_manager_test;
mod query_test;
