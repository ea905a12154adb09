mod builder;

use crate::{
    db::{
        document::{Document, RecordId},
        filter::Filter,
    },
    error::QueryError,
};

const ID: RecordId = RecordId::new(1);

fn person() -> Document {
    let address = Document::new().with("city", "oslo").with("zip", "0150");
    let orders = vec![
        Document::new().with("item", "pen").with("qty", 2),
        Document::new().with("item", "ink").with("qty", 5),
    ];

    Document::with_id(ID)
        .with("name", "ann")
        .with("age", 31)
        .with("score", 4.5)
        .with("nick", Option::<String>::None)
        .with("address", address)
        .with("tags", vec!["red", "blue"])
        .with("orders", orders)
        .with("scores", vec![3, 8, 12])
}

fn eval(filter: &Filter) -> Result<bool, QueryError> {
    filter.apply(ID, &person())
}
