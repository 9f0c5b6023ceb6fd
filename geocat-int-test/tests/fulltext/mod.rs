mod full_text_index_test;
mod hybrid_query_test;
