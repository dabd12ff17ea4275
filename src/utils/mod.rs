pub mod external_prog;
