#[cfg(test)]
mod tests {
    use crate::community::{AssignedLabels, Detector, Louvain};
    use crate::config::{DetectionParams, PhiNormalization, PipelineConfig, TrainingConfig, WalkConfig};
    use crate::corpus::{align, equalize_walks};
    use crate::embedding::allocate_embeddings;
    use crate::output::Concatenation;
    use crate::pipeline::{fit, fit_graph};
    use crate::train::{ExpectedTotals, SchedulerState, Trainer};
    use crate::{build_vocabulary, Error, Graph, Result};
    use std::collections::HashMap;

    fn ring() -> Graph<u32> {
        Graph::from_edges([(0, 1), (1, 2), (2, 3), (3, 0)])
    }

    fn two_triangles() -> Graph<u32> {
        Graph::from_edges([(0, 1), (1, 2), (0, 2), (3, 4), (4, 5), (3, 5), (2, 3)])
    }

    fn small_training() -> TrainingConfig {
        TrainingConfig::new()
            .with_dims(8, 8)
            .with_window(2)
            .with_negative(2)
            .with_workers(2)
            .with_batch_words(50)
    }

    #[test]
    fn test_ring_end_to_end() -> Result<()> {
        // 4-node ring, two communities {0, 1} and {2, 3}.
        let nodes = vec![vec![0u32, 1, 2, 3], vec![1, 2, 3, 0]];
        let communities = vec![vec![0usize, 0, 1, 1], vec![0, 1, 1, 0]];

        let vocab = build_vocabulary(&nodes)?;
        let corpus = align(&nodes, &communities)?;
        assert_eq!(corpus.total_tokens(), 8);

        let store = allocate_embeddings(&vocab, 8, 2, 8, 1)?;
        let config = TrainingConfig::new()
            .with_dims(8, 8)
            .with_window(1)
            .with_negative(2)
            .with_workers(2);
        let trainer = Trainer::new(&vocab, &store, config);
        let report = trainer.train_communities(&corpus, ExpectedTotals::of_walks(&nodes))?;

        assert_eq!(report.state, SchedulerState::Complete);
        assert_eq!(report.examples, 2);
        assert_eq!(report.raw_tokens, 8);
        assert!(report.mismatch.is_none());

        let frozen = store.freeze();
        assert_eq!(frozen.communities().dim(), (2, 8));
        assert!(frozen.community_context().iter().any(|&v| v != 0.0));
        assert!(frozen.nodes().iter().all(|v| v.is_finite()));
        Ok(())
    }

    #[test]
    fn test_mismatched_corpora_fail() {
        let nodes = vec![vec![0u32, 1, 2, 3], vec![1, 2, 3, 0]];
        let communities = vec![vec![0usize, 0, 1], vec![0, 1, 1, 0]];
        match align(&nodes, &communities) {
            Err(Error::LengthMismatch {
                walk: Some(0),
                expected: 4,
                found: 3,
            }) => {}
            other => panic!("expected a length mismatch in walk 0, got {:?}", other.err()),
        }
    }

    #[test]
    fn test_fit_from_graph_with_louvain() -> Result<()> {
        let graph = two_triangles();
        let walks = WalkConfig::default()
            .with_num_walks(4)
            .with_walk_length(12)
            .with_seed(5);
        let config = PipelineConfig::new().with_training(small_training());
        let model = fit_graph(&graph, &walks, &Detector::Louvain(Louvain::new()), &config)?;

        assert_eq!(model.vocab().len(), 6);
        assert_eq!(model.detection().num_communities(), 2);
        assert_eq!(model.embeddings().nodes().dim(), (6, 8));
        assert_eq!(model.embeddings().communities().dim(), (2, 8));
        assert_eq!(model.node_report().examples, 24);
        assert_eq!(model.community_report().raw_tokens, 24 * 12);
        assert!(model.node_vector(&4).is_some());
        assert!(model.node_vector(&40).is_none());
        assert!(model.community_vector(1).is_some());
        assert!(model.community_vector(2).is_none());
        Ok(())
    }

    #[test]
    fn test_fit_from_node2vec_walks() -> Result<()> {
        let graph = two_triangles();
        let walks = WalkConfig::default()
            .with_num_walks(3)
            .with_walk_length(10)
            .with_node2vec(0.5, 2.0);
        let config = PipelineConfig::new().with_training(small_training());
        let detector = Detector::from_name("label_propagation")?;
        let model = fit_graph(&graph, &walks, &detector, &config)?;

        assert_eq!(model.node_report().examples, 18);
        assert_eq!(model.community_report().raw_tokens, 18 * 10);
        for walk in model.detection().community_walks() {
            assert_eq!(walk.len(), 10);
        }
        Ok(())
    }

    #[test]
    fn test_fit_pads_short_walks() -> Result<()> {
        let walks = vec![vec![0u32, 1, 2, 3, 0, 1], vec![2, 3], vec![3, 0, 1]];
        let config = PipelineConfig::new().with_training(small_training());
        let model = fit(&ring(), walks, &Detector::from_name("label_propagation")?, &config)?;
        // Longest walk is 6; three walks padded to 6.
        assert_eq!(model.node_report().raw_tokens, 18);
        for labels in model.detection().community_walks() {
            assert_eq!(labels.len(), 6);
        }
        Ok(())
    }

    #[test]
    fn test_fit_rejects_unequal_widths() {
        let walks = vec![vec![0u32, 1, 2, 3]];
        let config = PipelineConfig::new().with_training(small_training().with_dims(8, 4));
        let err = fit(&ring(), walks, &Detector::Louvain(Louvain::new()), &config);
        assert!(matches!(err, Err(Error::Precondition(_))));
    }

    #[test]
    fn test_fit_rejects_empty_walk() {
        let walks = vec![vec![0u32, 1], vec![]];
        let config = PipelineConfig::new().with_training(small_training());
        let err = fit(&ring(), walks, &Detector::Louvain(Louvain::new()), &config);
        assert!(matches!(err, Err(Error::EmptyWalk { walk: 1 })));
    }

    #[test]
    fn test_single_worker_fit_is_reproducible() -> Result<()> {
        let graph = two_triangles();
        let walks = WalkConfig::default().with_num_walks(2).with_walk_length(8);
        let config = PipelineConfig::new().with_training(small_training().with_workers(1));
        let detector = Detector::from_name("louvain")?;

        let a = fit_graph(&graph, &walks, &detector, &config)?;
        let b = fit_graph(&graph, &walks, &detector, &config)?;
        assert_eq!(a.embeddings(), b.embeddings());
        Ok(())
    }

    #[test]
    fn test_assigned_labels_through_fit() -> Result<()> {
        let graph = Graph::from_edges([("a", "b"), ("b", "c")]);
        let mut walks = vec![vec!["a", "b", "c"], vec!["c", "b"]];
        equalize_walks(&mut walks, 3)?;

        let phi = ndarray::array![[1.0, 0.5, 0.0], [0.0, 0.5, 1.0]];
        let node_index: HashMap<&str, usize> = [("a", 0), ("b", 1), ("c", 2)].into_iter().collect();
        let detector = Detector::Assigned(AssignedLabels {
            phi,
            node_index,
            community_walks: vec![vec![Some(0), None, Some(1)], vec![None, None, None]],
        });
        let config = PipelineConfig::new()
            .with_walk_length(3)
            .with_training(small_training());
        let model = fit(&graph, walks, &detector, &config)?;

        let labels = model.detection().community_walks();
        assert_eq!(labels[0][0], 0);
        // "b" after label 0 inherits 0.
        assert_eq!(labels[0][1], 0);
        assert_eq!(labels[0][2], 1);
        // Padded walk ["c", "b", "b"]: c is one-hot 1, b inherits 1.
        assert_eq!(labels[1], vec![1, 1, 1]);
        Ok(())
    }

    #[test]
    fn test_concatenation_strategies() -> Result<()> {
        let graph = ring();
        let walks = vec![vec![0u32, 1, 2, 3], vec![2, 3, 0, 1]];
        let detector = Detector::Overlapping(vec![vec![0, 1], vec![2, 3]]);
        let params = DetectionParams::default().with_normalization(PhiNormalization::PerNode);
        let config = PipelineConfig::new()
            .with_detection(params)
            .with_training(small_training());
        let model = fit(&graph, walks, &detector, &config)?;

        let communities = model.embeddings().communities();
        let row_of = |id: u32| model.vocab().index_of(&id).map(|i| i as usize);

        let max = model.concatenated(Concatenation::Max)?;
        let min = model.concatenated(Concatenation::Min)?;
        let avg = model.concatenated(Concatenation::Average)?;
        assert_eq!(max.dim(), (4, 16));

        let i = row_of(2).ok_or(Error::EmptyInput)?;
        assert_eq!(max.row(i).slice(ndarray::s![..8]), model.embeddings().nodes().row(i));
        assert_eq!(max.row(i).slice(ndarray::s![8..]), communities.row(1));
        assert_eq!(min.row(i).slice(ndarray::s![8..]), communities.row(0));
        // One-hot membership: the average is the member community.
        for (a, b) in avg.row(i).slice(ndarray::s![8..]).iter().zip(communities.row(1)) {
            assert!((a - b).abs() < 1e-6);
        }
        Ok(())
    }

    #[test]
    fn test_written_files_have_headers() -> Result<()> {
        let config = PipelineConfig::new().with_training(small_training());
        let walks = vec![vec![0u32, 1, 2, 3], vec![1, 2, 3, 0]];
        let model = fit(&ring(), walks, &Detector::from_name("louvain")?, &config)?;
        let k = model.detection().num_communities();

        let mut nodes = Vec::new();
        model.write_node_embeddings(&mut nodes)?;
        let nodes = String::from_utf8(nodes).unwrap();
        let mut lines = nodes.lines();
        assert_eq!(lines.next(), Some("4 8"));
        assert_eq!(lines.count(), 4);

        let mut comms = Vec::new();
        model.write_community_embeddings(&mut comms)?;
        let comms = String::from_utf8(comms).unwrap();
        assert!(comms.starts_with(&format!("{k} 8\n0 ")));

        let mut joined = Vec::new();
        model.write_concatenated(&mut joined, Concatenation::Average)?;
        let joined = String::from_utf8(joined).unwrap();
        let first_row = joined.lines().nth(1).unwrap();
        assert_eq!(first_row.split(' ').count(), 1 + 16);
        Ok(())
    }
}
