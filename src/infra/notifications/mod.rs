pub mod job_queue_notifier;
