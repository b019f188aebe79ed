/// CRUD operations against a live Postgres (skipped without `DATABASE_URL`)
pub mod crud_tests;
