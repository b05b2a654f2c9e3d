use pest_derive::Parser;

#[derive(Parser)]
#[grammar = "idli.pest"]
pub struct AsmParser;
