pub mod test_bus;
