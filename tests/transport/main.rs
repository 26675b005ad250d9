// Transport integration tests
