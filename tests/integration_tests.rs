mod integration {
    mod error_continuation_tests;
    mod path_edge_cases;
    mod scan_tests;
}
