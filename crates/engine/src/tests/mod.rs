mod helpers;

mod cleaner_tests;
mod ingest_tests;
mod read_tests;
mod recovery_tests;
mod stats_tests;
