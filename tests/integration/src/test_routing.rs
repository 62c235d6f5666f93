//! Routing table construction and resolution against the sample engines.

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use ruststack_fallback::{DispatchError, RoutingTable};

    use crate::dispatcher;

    #[test]
    fn test_should_route_function_resources_by_path() {
        let dispatcher = dispatcher();
        let table = dispatcher.routing_table("lambda").unwrap();
        assert_eq!(table.len(), 3);

        let listed = table.match_path("/2015-03-31/functions").unwrap();
        assert_eq!(listed.pattern, "/2015-03-31/functions/");

        let function = table.match_path("/2015-03-31/functions/hello").unwrap();
        assert_eq!(function.pattern, "/2015-03-31/functions/<function_name>");
        assert_eq!(function.params["function_name"], "hello");

        let invoke = table.match_path("/2015-03-31/functions/hello/invocations").unwrap();
        assert_eq!(invoke.params["function_name"], "hello");

        let slashed = table.match_path("/2015-03-31/functions/hello/").unwrap();
        assert_eq!(slashed.pattern, "/2015-03-31/functions/<function_name>");
        assert_eq!(slashed.params["function_name"], "hello");

        let Err(err) = dispatcher.resolve("lambda", "/2015-03-31/layers") else {
            panic!("layers are not routed");
        };
        assert!(matches!(err, DispatchError::NoMatchingRoute { .. }));
    }

    #[test]
    fn test_should_route_queue_paths_of_default_partition() {
        let dispatcher = dispatcher();
        let table = dispatcher.routing_table("sqs").unwrap();
        assert_eq!(table.len(), 2);

        assert_eq!(table.match_path("/").unwrap().pattern, "/");
        let queue = table.match_path("/000000000000/orders.fifo").unwrap();
        assert_eq!(queue.params["account_id"], "000000000000");
        assert_eq!(queue.params["queue_name"], "orders.fifo");
        assert!(table.match_path("/123/orders").is_none());
    }

    #[test]
    fn test_should_build_each_table_once_under_concurrency() {
        let dispatcher = dispatcher();
        let tables: Vec<Arc<RoutingTable>> = std::thread::scope(|s| {
            let handles: Vec<_> = (0..16)
                .map(|i| {
                    let dispatcher = &dispatcher;
                    s.spawn(move || {
                        let service = if i % 2 == 0 { "sqs" } else { "lambda" };
                        dispatcher.routing_table(service).unwrap()
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        for table in &tables {
            let cached = dispatcher.tables().get(table.service()).unwrap();
            assert!(Arc::ptr_eq(table, &cached));
        }
        assert_eq!(dispatcher.tables().len(), 2);
    }

    #[test]
    fn test_should_reject_services_without_backend() {
        let dispatcher = dispatcher();
        let err = dispatcher.routing_table("s3").unwrap_err();
        assert!(matches!(err, DispatchError::Configuration { ref service, .. } if service == "s3"));
        assert!(!dispatcher.tables().contains("s3"));
    }
}
