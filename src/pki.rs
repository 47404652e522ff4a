pub mod crl;
