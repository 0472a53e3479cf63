mod http_basic_test;
mod tls_client_cert_test;
