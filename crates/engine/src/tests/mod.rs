mod fixtures;

mod instance_tests;
