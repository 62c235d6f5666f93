//! A partial provider backed by the queue engine.

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use http::StatusCode;
    use ruststack_asf::{
        DispatchTable, HandlerResponse, NotImplemented, ProviderError, RequestContext,
        ServiceProvider, ServiceRequest, ServiceResponse,
    };
    use serde_json::json;

    use crate::{NON_EXISTENT_QUEUE, context, default_account, dispatcher, queue_service};

    /// Implements `ListQueues` itself and declines everything else.
    struct LocalQueues;

    impl ServiceProvider for LocalQueues {
        fn service_name(&self) -> &str {
            "sqs"
        }

        fn dispatch_table(self: Arc<Self>) -> DispatchTable {
            let declined = |ctx: &mut RequestContext, _: ServiceRequest| -> Result<HandlerResponse, ProviderError> {
                Err(NotImplemented::new(ctx.service_name(), &ctx.operation.name).into())
            };
            DispatchTable::new()
                .with("ListQueues", |_, _| {
                    let mut out = ServiceResponse::new();
                    out.insert("QueueUrls".to_owned(), json!(["local"]));
                    Ok(HandlerResponse::Structured(out))
                })
                .with("CreateQueue", declined)
                .with("GetQueueUrl", declined)
                .with("DeleteQueue", declined)
        }
    }

    fn call(
        provider: &impl Fn(&mut RequestContext) -> Result<HandlerResponse, ProviderError>,
        operation: &str,
        params: serde_json::Value,
    ) -> Result<HandlerResponse, ProviderError> {
        let mut ctx = context(&queue_service().operation(operation), params, &default_account());
        provider(&mut ctx)
    }

    #[test]
    fn test_should_return_backend_response_for_declined_operations() {
        let dispatcher = dispatcher();
        let wrapped = dispatcher.wrap_with_fallback(Arc::new(LocalQueues));
        let provider = |ctx: &mut RequestContext| {
            let request = ctx.service_request.clone().unwrap_or_default();
            wrapped.dispatch(ctx, request)
        };

        let via_fallback = call(&provider, "CreateQueue", json!({"QueueName": "jobs"})).unwrap();
        let mut direct_ctx = context(
            &queue_service().operation("CreateQueue"),
            json!({"QueueName": "jobs"}),
            &default_account(),
        );
        let direct = dispatcher.proxy_call(&mut direct_ctx).unwrap();
        assert_eq!(via_fallback, HandlerResponse::Http(direct));
    }

    #[test]
    fn test_should_pass_error_statuses_through_unparsed() {
        let dispatcher = dispatcher();
        let wrapped = dispatcher.wrap_with_fallback(Arc::new(LocalQueues));
        let provider = |ctx: &mut RequestContext| {
            let request = ctx.service_request.clone().unwrap_or_default();
            wrapped.dispatch(ctx, request)
        };

        match call(&provider, "GetQueueUrl", json!({"QueueName": "ghost"})).unwrap() {
            HandlerResponse::Http(response) => {
                assert_eq!(response.status, StatusCode::BAD_REQUEST);
                assert!(response.body_text().contains(NON_EXISTENT_QUEUE));
            }
            other => panic!("unexpected response: {other:?}"),
        }

        let err = call(
            &provider,
            "DeleteQueue",
            json!({"QueueUrl": "http://localhost.localstack.cloud/000000000000/ghost"}),
        )
        .unwrap_err();
        assert!(matches!(err, ProviderError::Service(ref e) if e.code == NON_EXISTENT_QUEUE));
    }

    #[test]
    fn test_should_keep_implemented_operations_local() {
        let dispatcher = dispatcher();
        let wrapped = dispatcher.wrap_with_fallback(Arc::new(LocalQueues));
        let provider = |ctx: &mut RequestContext| wrapped.dispatch(ctx, Default::default());

        call(&provider, "CreateQueue", json!({"QueueName": "remote"})).unwrap();
        match call(&provider, "ListQueues", json!({})).unwrap() {
            HandlerResponse::Structured(out) => assert_eq!(out["QueueUrls"], json!(["local"])),
            other => panic!("unexpected response: {other:?}"),
        }

        let err = call(&provider, "PurgeQueue", json!({})).unwrap_err();
        assert!(matches!(err, ProviderError::Service(ref e) if e.code == "InvalidAction"));
    }

    #[test]
    fn test_should_expose_wrapped_provider_as_provider() {
        let dispatcher = dispatcher();
        let wrapped = Arc::new(dispatcher.wrap_with_fallback(Arc::new(LocalQueues)));
        assert_eq!(wrapped.service_name(), "sqs");
        let table = wrapped.dispatch_table();
        assert_eq!(
            table.operations().collect::<Vec<_>>(),
            ["CreateQueue", "DeleteQueue", "GetQueueUrl", "ListQueues"]
        );
    }
}
