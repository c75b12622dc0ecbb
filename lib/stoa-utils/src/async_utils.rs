use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};

/// Spawns a task that drains `from`, applies `f`, and sends the results into
/// `to`. Stops when either side of either channel is gone.
pub fn forward_unbounded_channel<I, O, F>(mut from: UnboundedReceiver<I>, to: UnboundedSender<O>, mut f: F)
where
    I: 'static + Send,
    O: 'static + Send,
    F: 'static + FnMut(I) -> Option<O> + Send,
{
    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = to.closed() => {
                    // receiver is dropped, stop forwarding
                    break;
                },

                message_res = from.recv() => {
                    let message_in = match message_res {
                        Some(message) => message,
                        None => {
                            // previous sender is dropped, stop forwarding
                            break
                        },
                    };
                    if let Some(message_out) = f(message_in) {
                        if to.send(message_out).is_err() {
                            // receiver is dropped, stop forwarding
                            break
                        }
                    }
                },
            }
        }
    });
}
