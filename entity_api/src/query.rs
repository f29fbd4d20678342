use crate::error::Error;
use sea_orm::strum::IntoEnumIterator;
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, Order, QueryFilter, QueryOrder};

pub use crate::{IntoQueryFilterMap, QueryFilterMap};

/// Describes how a listing should be ordered. Implemented by endpoint parameter
/// types alongside `IntoQueryFilterMap`.
pub trait QuerySort<C: ColumnTrait> {
    fn get_sort_column(&self) -> Option<C>;
    fn get_sort_order(&self) -> Option<Order>;
}

/// Find all records of an entity by the given filter parameters, applying the
/// parameters' sort column and order when both are present.
pub async fn find_by<E, C, P>(db: &impl ConnectionTrait, params: P) -> Result<Vec<E::Model>, Error>
where
    E: EntityTrait<Column = C>,
    C: ColumnTrait + IntoEnumIterator,
    P: IntoQueryFilterMap + QuerySort<C>,
{
    let sort = params.get_sort_column().zip(params.get_sort_order());
    let query_filter_map: QueryFilterMap = params.into_query_filter_map();

    let mut query = E::find();

    // We iterate through the entity's defined columns so that we only attempt
    // to filter by columns that exist.
    for column in C::iter() {
        if let Some(value) = query_filter_map.get(&column.to_string()) {
            query = query.filter(column.eq(value));
        }
    }

    if let Some((column, order)) = sort {
        query = query.order_by(column, order);
    }

    Ok(query.all(db).await?)
}

#[cfg(test)]
#[cfg(feature = "mock")]
mod tests {
    use super::*;
    use entity::mentorship_requests;
    use sea_orm::{DatabaseBackend, MockDatabase, Value};

    struct StatusFilter;

    impl IntoQueryFilterMap for StatusFilter {
        fn into_query_filter_map(self) -> QueryFilterMap {
            let mut map = QueryFilterMap::new();
            map.insert(
                "status".to_string(),
                Some(Value::String(Some(Box::new("pending".to_string())))),
            );
            // Not a column of mentorship_requests; must be ignored.
            map.insert(
                "preferred_mentor_name".to_string(),
                Some(Value::String(Some(Box::new("ignored".to_string())))),
            );
            map
        }
    }

    impl QuerySort<mentorship_requests::Column> for StatusFilter {
        fn get_sort_column(&self) -> Option<mentorship_requests::Column> {
            Some(mentorship_requests::Column::CreatedAt)
        }

        fn get_sort_order(&self) -> Option<Order> {
            Some(Order::Asc)
        }
    }

    #[tokio::test]
    async fn find_by_filters_only_known_columns_and_sorts() -> Result<(), Error> {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results(vec![Vec::<mentorship_requests::Model>::new()])
            .into_connection();

        find_by::<mentorship_requests::Entity, mentorship_requests::Column, _>(&db, StatusFilter)
            .await?;

        let log = db.into_transaction_log();
        assert_eq!(log.len(), 1);
        let sql = log[0].statements()[0].sql.clone();
        assert!(sql.contains(r#"WHERE "mentorship_requests"."status" = "#));
        assert!(sql.ends_with(r#"ORDER BY "mentorship_requests"."created_at" ASC"#));
        assert!(!sql.contains("preferred_mentor_name"));

        Ok(())
    }
}
