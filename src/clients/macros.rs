/// Generate client methods with oneshot channel boilerplate and automatic tracing.
///
/// Channel failures (service stopped, reply dropped) surface as
/// `ActorCommunicationError`.
macro_rules! client_method {
    ($client:ty => fn $method:ident($($param:ident: $param_type:ty),*) -> $return_type:ty as $request:ident::$variant:ident) => {
        impl $client {
            #[tracing::instrument(skip(self))]
            pub async fn $method(&self, $($param: $param_type),*) -> Result<$return_type, $crate::error::RepositoryError> {
                tracing::debug!("Sending request");
                let (respond_to, response) = tokio::sync::oneshot::channel();
                self.sender
                    .send($request::$variant {
                        $($param,)*
                        respond_to,
                    })
                    .await
                    .map_err(|_| $crate::error::RepositoryError::ActorCommunicationError("Service closed".to_string()))?;

                response
                    .await
                    .map_err(|_| $crate::error::RepositoryError::ActorCommunicationError("Service dropped the reply".to_string()))?
            }
        }
    };
}

pub(crate) use client_method;
