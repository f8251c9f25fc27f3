use speculate2::speculate;

speculate! {
    use std::sync::Arc;

    use chrono::{NaiveDate, TimeZone, Utc};
    use habitual_core::effects::NotificationKind;
    use habitual_core::models::*;
    use habitual_core::{Database, FixedClock, HabitEngine, HabitError, RecordingSink};

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn setup() -> (HabitEngine, Arc<FixedClock>) {
        let db = Database::open_memory().expect("Failed to create test database");
        db.migrate().expect("Failed to migrate test database");
        let clock = Arc::new(FixedClock::at_noon(day(2024, 1, 1)));
        (HabitEngine::new(db, clock.clone()), clock)
    }

    fn create_habit(engine: &HabitEngine, user_id: &str, title: &str) -> Habit {
        engine
            .create_habit(CreateHabitInput {
                user_id: user_id.into(),
                title: title.into(),
                description: None,
                start_day: None,
                end_day: None,
            })
            .expect("Failed to create habit")
            .value
    }

    fn mark(engine: &HabitEngine, habit: &Habit) -> Habit {
        engine
            .mark_completed(habit.id, &habit.user_id, None)
            .expect("Failed to mark habit")
            .value
    }

    describe "habit catalog" {
        it "creates habits with zeroed streak state" {
            let (engine, _) = setup();
            let habit = create_habit(&engine, "u1", "  Read  ");

            assert_eq!(habit.title, "Read");
            assert_eq!(habit.start_day, day(2024, 1, 1));
            assert_eq!(habit.current_streak, 0);
            assert_eq!(habit.longest_streak, 0);
            assert!(!habit.is_completed);
            assert_eq!(habit.streak_quality, 0.0);

            let stored = engine.get_habit(habit.id).unwrap();
            assert_eq!(stored.title, "Read");
        }

        it "rejects invalid input" {
            let (engine, _) = setup();
            let result = engine.create_habit(CreateHabitInput {
                user_id: "u1".into(),
                title: "".into(),
                description: None,
                start_day: None,
                end_day: None,
            });
            assert!(matches!(result, Err(HabitError::InvalidInput(_))));
        }

        it "rejects an end_day before the default start_day" {
            let (engine, _) = setup();
            let result = engine.create_habit(CreateHabitInput {
                user_id: "u1".into(),
                title: "Stretch".into(),
                description: None,
                start_day: None,
                end_day: Some(day(2023, 12, 31)),
            });
            assert!(matches!(result, Err(HabitError::InvalidInput(_))));
        }

        it "updates only the provided fields" {
            let (engine, _) = setup();
            let habit = create_habit(&engine, "u1", "Read");

            let updated = engine
                .update_habit(habit.id, UpdateHabitInput {
                    description: Some("20 pages".into()),
                    ..Default::default()
                })
                .unwrap()
                .value;

            assert_eq!(updated.title, "Read");
            assert_eq!(updated.description.as_deref(), Some("20 pages"));
        }

        it "clears optional fields on request" {
            let (engine, _) = setup();
            let habit = engine
                .create_habit(CreateHabitInput {
                    user_id: "u1".into(),
                    title: "Read".into(),
                    description: Some("20 pages".into()),
                    start_day: None,
                    end_day: Some(day(2024, 3, 1)),
                })
                .unwrap()
                .value;

            let updated = engine
                .update_habit(habit.id, UpdateHabitInput {
                    clear_description: true,
                    clear_end_day: true,
                    ..Default::default()
                })
                .unwrap()
                .value;

            assert_eq!(updated.title, "Read");
            assert!(updated.description.is_none());
            assert!(updated.end_day.is_none());
        }

        it "returns NotFound when updating a missing habit" {
            let (engine, _) = setup();
            let result = engine.update_habit(uuid::Uuid::new_v4(), UpdateHabitInput {
                title: Some("x".into()),
                ..Default::default()
            });
            assert!(matches!(result, Err(HabitError::NotFound(_))));
        }

        it "deletes habits together with their logs and history" {
            let (engine, clock) = setup();
            let habit = create_habit(&engine, "u1", "Read");
            mark(&engine, &habit);
            clock.advance_days(3);
            let _ = engine.check_and_reset_broken_streaks().unwrap();

            let _ = engine.delete_habit(habit.id).unwrap();

            assert!(matches!(engine.get_habit(habit.id), Err(HabitError::NotFound(_))));
            assert!(engine.db().list_completions_for_habit(habit.id).unwrap().is_empty());
            assert!(engine.list_streak_history(habit.id).unwrap().is_empty());

            let events = engine.db().list_analytics_events(habit.id).unwrap();
            assert_eq!(events.last().map(|e| e.action), Some(AnalyticsAction::Deleted));
        }

        it "lists only the user's habits" {
            let (engine, _) = setup();
            create_habit(&engine, "u1", "Read");
            create_habit(&engine, "u1", "Run");
            create_habit(&engine, "u2", "Swim");

            let habits = engine.list_habits("u1").unwrap();
            assert_eq!(habits.len(), 2);
            assert!(habits.iter().all(|h| h.user_id == "u1"));
        }
    }

    describe "mark_completed" {
        it "increments the streak and marks the habit completed" {
            let (engine, _) = setup();
            let habit = create_habit(&engine, "u1", "Read");

            let marked = mark(&engine, &habit);

            assert_eq!(marked.current_streak, 1);
            assert_eq!(marked.longest_streak, 1);
            assert!(marked.is_completed);
            assert_eq!(
                marked.last_completed_date,
                Some(Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap())
            );
            assert!(marked.streak_start_date.is_some());
        }

        it "appends a completion log row for the day" {
            let (engine, _) = setup();
            let habit = create_habit(&engine, "u1", "Read");
            mark(&engine, &habit);

            let logs = engine.db().list_completions_for_habit(habit.id).unwrap();
            assert_eq!(logs.len(), 1);
            assert_eq!(logs[0].date.date_naive(), day(2024, 1, 1));
        }

        it "honours an explicit completion date" {
            let (engine, _) = setup();
            let habit = create_habit(&engine, "u1", "Read");
            let yesterday = Utc.with_ymd_and_hms(2023, 12, 31, 8, 0, 0).unwrap();

            let marked = engine
                .mark_completed(habit.id, "u1", Some(yesterday))
                .unwrap()
                .value;

            assert_eq!(marked.last_completed_date, Some(yesterday));
            let heatmap = engine.get_heatmap_data("u1", day(2023, 12, 31), day(2023, 12, 31)).unwrap();
            assert_eq!(heatmap.get("2023-12-31"), Some(&1));
        }

        it "fails with NotFound for an unknown habit" {
            let (engine, _) = setup();
            let result = engine.mark_completed(uuid::Uuid::new_v4(), "u1", None);
            assert!(matches!(result, Err(HabitError::NotFound(_))));
        }

        it "fails with NotFound when the habit belongs to someone else" {
            let (engine, _) = setup();
            let habit = create_habit(&engine, "u1", "Read");
            let result = engine.mark_completed(habit.id, "intruder", None);
            assert!(matches!(result, Err(HabitError::NotFound(_))));
            assert_eq!(engine.get_habit(habit.id).unwrap().current_streak, 0);
        }

        it "emits a completed notification and a cache invalidation" {
            let (engine, _) = setup();
            let habit = create_habit(&engine, "u1", "Read");
            let sink = RecordingSink::new();

            engine.mark_completed(habit.id, "u1", None).unwrap().dispatch(&sink);

            let kinds: Vec<_> = sink.notifications().iter().map(|n| n.kind).collect();
            assert_eq!(kinds, vec![NotificationKind::Completed]);
            assert_eq!(sink.effects().len(), 2);
        }

        it "emits a milestone notification on the third consecutive day" {
            let (engine, clock) = setup();
            let habit = create_habit(&engine, "u1", "Read");
            mark(&engine, &habit);
            clock.advance_days(1);
            mark(&engine, &habit);
            clock.advance_days(1);

            let sink = RecordingSink::new();
            let marked = engine.mark_completed(habit.id, "u1", None).unwrap().dispatch(&sink);

            assert_eq!(marked.current_streak, 3);
            let kinds: Vec<_> = sink.notifications().iter().map(|n| n.kind).collect();
            assert_eq!(kinds, vec![NotificationKind::StreakMilestone, NotificationKind::Completed]);

            let actions: Vec<_> = engine
                .db()
                .list_analytics_events(habit.id)
                .unwrap()
                .into_iter()
                .map(|e| e.action)
                .collect();
            assert!(actions.contains(&AnalyticsAction::StreakStarted));
            assert!(actions.contains(&AnalyticsAction::StreakMilestone));
        }

        it "counts repeated marks on the same day" {
            let (engine, _) = setup();
            let habit = create_habit(&engine, "u1", "Read");
            mark(&engine, &habit);
            let again = mark(&engine, &habit);

            assert_eq!(again.current_streak, 2);
            let heatmap = engine.get_heatmap_data("u1", day(2024, 1, 1), day(2024, 1, 1)).unwrap();
            assert_eq!(heatmap.get("2024-01-01"), Some(&2));
        }

        it "loses no increments under concurrent marks" {
            let (engine, _) = setup();
            let habit = create_habit(&engine, "u1", "Read");

            let handles: Vec<_> = (0..8)
                .map(|_| {
                    let engine = engine.clone();
                    let id = habit.id;
                    std::thread::spawn(move || {
                        engine.mark_completed(id, "u1", None).unwrap();
                    })
                })
                .collect();
            for handle in handles {
                handle.join().unwrap();
            }

            let stored = engine.get_habit(habit.id).unwrap();
            assert_eq!(stored.current_streak, 8);
            assert_eq!(stored.longest_streak, 8);
        }
    }

    describe "unmark_completed" {
        it "restores the pre-mark state" {
            let (engine, _) = setup();
            let habit = create_habit(&engine, "u1", "Read");
            let before = engine.get_heatmap_data("u1", day(2024, 1, 1), day(2024, 1, 1)).unwrap();

            mark(&engine, &habit);
            let unmarked = engine.unmark_completed(habit.id, "u1").unwrap().value;

            assert_eq!(unmarked.current_streak, 0);
            assert!(!unmarked.is_completed);
            let after = engine.get_heatmap_data("u1", day(2024, 1, 1), day(2024, 1, 1)).unwrap();
            assert_eq!(before, after);
        }

        it "removes a single row when a day was marked twice" {
            let (engine, _) = setup();
            let habit = create_habit(&engine, "u1", "Read");
            mark(&engine, &habit);
            mark(&engine, &habit);

            let _ = engine.unmark_completed(habit.id, "u1").unwrap();

            let heatmap = engine.get_heatmap_data("u1", day(2024, 1, 1), day(2024, 1, 1)).unwrap();
            assert_eq!(heatmap.get("2024-01-01"), Some(&1));
        }

        it "starts a fresh streak after unmarking back to zero" {
            let (engine, clock) = setup();
            let habit = create_habit(&engine, "u1", "Read");
            mark(&engine, &habit);
            let unmarked = engine.unmark_completed(habit.id, "u1").unwrap().value;
            assert!(unmarked.streak_start_date.is_none());

            clock.advance_days(1);
            let remarked = mark(&engine, &habit);

            assert_eq!(remarked.current_streak, 1);
            assert_eq!(remarked.streak_start_date.map(|t| t.date_naive()), Some(day(2024, 1, 2)));
        }

        it "keeps the streak start while the counter stays positive" {
            let (engine, clock) = setup();
            let habit = create_habit(&engine, "u1", "Read");
            mark(&engine, &habit);
            clock.advance_days(1);
            mark(&engine, &habit);

            let unmarked = engine.unmark_completed(habit.id, "u1").unwrap().value;

            assert_eq!(unmarked.current_streak, 1);
            assert_eq!(unmarked.streak_start_date.map(|t| t.date_naive()), Some(day(2024, 1, 1)));
        }

        it "does not clamp the streak at zero" {
            let (engine, _) = setup();
            let habit = create_habit(&engine, "u1", "Read");

            let unmarked = engine.unmark_completed(habit.id, "u1").unwrap().value;

            assert_eq!(unmarked.current_streak, -1);
        }

        it "fails with NotFound for an unknown habit" {
            let (engine, _) = setup();
            let result = engine.unmark_completed(uuid::Uuid::new_v4(), "u1");
            assert!(matches!(result, Err(HabitError::NotFound(_))));
        }
    }

    describe "log_streak_history" {
        it "attributes the full run when nothing overlaps" {
            let (engine, _) = setup();
            let habit = create_habit(&engine, "u1", "Read");
            let end = Utc.with_ymd_and_hms(2024, 1, 10, 12, 0, 0).unwrap();

            let row = engine.log_streak_history(habit.id, 5, end).unwrap();

            assert_eq!(row.start_day(), day(2024, 1, 6));
            assert_eq!(row.end_day(), day(2024, 1, 10));
            assert_eq!(row.streak_length, 5);
            assert_eq!(row.completed_days, 5);
        }

        it "subtracts the span of an overlapping run" {
            let (engine, _) = setup();
            let habit = create_habit(&engine, "u1", "Read");
            let first_end = Utc.with_ymd_and_hms(2024, 1, 5, 12, 0, 0).unwrap();
            engine.log_streak_history(habit.id, 5, first_end).unwrap();

            let second_end = Utc.with_ymd_and_hms(2024, 1, 7, 12, 0, 0).unwrap();
            let row = engine.log_streak_history(habit.id, 7, second_end).unwrap();

            assert_eq!(row.completed_days, 2);
        }

        it "subtracts only the first of several overlapping runs" {
            let (engine, _) = setup();
            let habit = create_habit(&engine, "u1", "Read");
            let at = |d: u32| Utc.with_ymd_and_hms(2024, 1, d, 12, 0, 0).unwrap();
            engine.log_streak_history(habit.id, 3, at(3)).unwrap();
            engine.log_streak_history(habit.id, 3, at(8)).unwrap();

            let row = engine.log_streak_history(habit.id, 10, at(10)).unwrap();

            // Overlaps both [1..3] and [6..8]; only the first is subtracted
            assert_eq!(row.completed_days, 7);
        }

        it "clamps the adjusted days at zero" {
            let (engine, _) = setup();
            let habit = create_habit(&engine, "u1", "Read");
            let end = Utc.with_ymd_and_hms(2024, 1, 10, 12, 0, 0).unwrap();
            engine.log_streak_history(habit.id, 10, end).unwrap();

            let row = engine.log_streak_history(habit.id, 2, end).unwrap();

            assert_eq!(row.completed_days, 0);
        }
    }

    describe "streak quality" {
        it "scores two separated runs against their union span" {
            let (engine, _) = setup();
            let habit = create_habit(&engine, "u1", "Read");
            let at = |d: u32| Utc.with_ymd_and_hms(2024, 1, d, 12, 0, 0).unwrap();
            engine.log_streak_history(habit.id, 10, at(10)).unwrap();
            engine.log_streak_history(habit.id, 6, at(20)).unwrap();

            let quality = engine.recompute_quality(habit.id).unwrap();

            assert!((quality - 0.8).abs() < 1e-9);
            let stored = engine.get_habit(habit.id).unwrap();
            assert!((stored.streak_quality - 0.8).abs() < 1e-9);
        }

        it "reports the bulk formula alongside the cached score" {
            let (engine, _) = setup();
            let habit = create_habit(&engine, "u1", "Read");
            let at = |d: u32| Utc.with_ymd_and_hms(2024, 1, d, 12, 0, 0).unwrap();
            engine.log_streak_history(habit.id, 10, at(10)).unwrap();
            engine.log_streak_history(habit.id, 6, at(20)).unwrap();
            engine.recompute_quality(habit.id).unwrap();

            let stats = engine.get_streak_stats(habit.id).unwrap();

            assert_eq!(stats.runs, 2);
            assert_eq!(stats.total_completed_days, 16);
            assert!((stats.streak_quality - 0.8).abs() < 1e-9);
            assert!((stats.bulk_quality - 1.0).abs() < 1e-9);
        }

        it "is zero without history" {
            let (engine, _) = setup();
            let habit = create_habit(&engine, "u1", "Read");
            assert_eq!(engine.recompute_quality(habit.id).unwrap(), 0.0);
        }
    }

    describe "aggregates" {
        it "groups completions per day across habits" {
            let (engine, clock) = setup();
            let read = create_habit(&engine, "u1", "Read");
            let run = create_habit(&engine, "u1", "Run");
            mark(&engine, &read);
            mark(&engine, &run);
            clock.advance_days(1);
            mark(&engine, &read);
            clock.advance_days(1);
            mark(&engine, &run);

            let heatmap = engine.get_heatmap_data("u1", day(2024, 1, 1), day(2024, 1, 2)).unwrap();

            let expected: Heatmap = [("2024-01-01".to_string(), 2), ("2024-01-02".to_string(), 1)]
                .into_iter()
                .collect();
            assert_eq!(heatmap, expected);
        }

        it "excludes other users from the heatmap" {
            let (engine, _) = setup();
            let mine = create_habit(&engine, "u1", "Read");
            let theirs = create_habit(&engine, "u2", "Read");
            mark(&engine, &mine);
            mark(&engine, &theirs);

            let heatmap = engine.get_heatmap_data("u1", day(2024, 1, 1), day(2024, 1, 1)).unwrap();
            assert_eq!(heatmap.get("2024-01-01"), Some(&1));
        }

        it "rejects an inverted heatmap range" {
            let (engine, _) = setup();
            let result = engine.get_heatmap_data("u1", day(2024, 1, 2), day(2024, 1, 1));
            assert!(matches!(result, Err(HabitError::InvalidInput(_))));
        }

        it "summarises the dashboard" {
            let (engine, clock) = setup();
            let read = create_habit(&engine, "u1", "Read");
            create_habit(&engine, "u1", "Run");
            mark(&engine, &read);
            clock.advance_days(1);
            mark(&engine, &read);

            let metrics = engine.get_dashboard_metrics("u1").unwrap();

            assert_eq!(metrics, DashboardMetrics {
                total: 2,
                active: 1,
                completed: 1,
                max_current_streak: 2,
            });
        }

        it "returns an empty dashboard for unknown users" {
            let (engine, _) = setup();
            let metrics = engine.get_dashboard_metrics("nobody").unwrap();
            assert_eq!(metrics.total, 0);
            assert_eq!(metrics.max_current_streak, 0);
        }
    }

    describe "reminders" {
        it "reminds only about open habits that are due today" {
            let (engine, _) = setup();
            let open = create_habit(&engine, "u1", "Read");
            let done = create_habit(&engine, "u1", "Run");
            engine
                .create_habit(CreateHabitInput {
                    user_id: "u1".into(),
                    title: "Future".into(),
                    description: None,
                    start_day: Some(day(2024, 2, 1)),
                    end_day: None,
                })
                .unwrap();
            mark(&engine, &done);

            let sink = RecordingSink::new();
            let count = engine.send_due_reminders().unwrap().dispatch(&sink);

            assert_eq!(count, 1);
            let notifications = sink.notifications();
            assert_eq!(notifications[0].habit_id, open.id);
            assert_eq!(notifications[0].kind, NotificationKind::Reminder);
        }

        it "selects the same habits as Habit::is_due_on" {
            let (engine, _) = setup();
            let windows = [
                (day(2023, 12, 1), None),
                (day(2023, 12, 1), Some(day(2023, 12, 31))),
                (day(2024, 1, 1), Some(day(2024, 1, 1))),
                (day(2024, 1, 2), None),
                (day(2023, 6, 1), Some(day(2024, 6, 1))),
            ];
            for (i, (start, end)) in windows.into_iter().enumerate() {
                engine
                    .create_habit(CreateHabitInput {
                        user_id: "u1".into(),
                        title: format!("Habit {}", i),
                        description: None,
                        start_day: Some(start),
                        end_day: end,
                    })
                    .unwrap();
            }

            let today = day(2024, 1, 1);
            let due: Vec<_> = engine
                .db()
                .list_due_uncompleted_habits(today)
                .unwrap()
                .into_iter()
                .map(|h| h.id)
                .collect();
            let expected: Vec<_> = engine
                .list_habits("u1")
                .unwrap()
                .into_iter()
                .filter(|h| h.is_due_on(today))
                .map(|h| h.id)
                .collect();

            assert_eq!(due.len(), 3);
            assert_eq!(due, expected);
        }
    }
}
